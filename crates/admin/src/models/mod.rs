//! Domain models for the back-office.
//!
//! Value types only. Persistence lives behind the repository traits in
//! [`crate::db`], so these types carry no database handles.

pub mod admin;
pub mod catalog;
pub mod links;
pub mod page;
pub mod session;

pub use admin::{Admin, AdminChanges, AdminDetail, AdminForm, NewAdmin, Permission, Role};
pub use catalog::{Brand, Category, Item, ItemForm, NameForm, NamedRecord, NewItem};
pub use links::{AdminLinks, LinkDiff};
pub use page::{Page, PageRequest};
pub use session::{CurrentAdmin, keys as session_keys};
