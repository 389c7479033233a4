pub mod metal;
