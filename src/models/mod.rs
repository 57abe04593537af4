pub mod product;
pub mod user;

pub use product::{Product, ProductInput, ProductPatch, ProductQuery};
pub use user::{NewUser, User, UserChanges, UserProfile};
