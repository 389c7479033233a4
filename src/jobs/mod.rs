pub mod price_updater;
