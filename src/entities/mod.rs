pub mod company;
pub mod material;
pub mod material_movement;
pub mod purchase;
pub mod purchase_item;
pub mod user;

pub mod prelude {
    pub use super::company::Entity as Company;
    pub use super::material::Entity as Material;
    pub use super::material_movement::Entity as MaterialMovement;
    pub use super::purchase::Entity as Purchase;
    pub use super::purchase_item::Entity as PurchaseItem;
    pub use super::user::Entity as User;
}
