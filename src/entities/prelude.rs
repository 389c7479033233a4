pub use super::metal_analyses::Entity as MetalAnalyses;
pub use super::metal_prices::Entity as MetalPrices;
pub use super::metals::Entity as Metals;
