pub mod blacklist_entry;
pub mod click_event;
pub mod short_link;

pub use blacklist_entry::Entity as BlacklistEntity;
pub use click_event::Entity as ClickEventEntity;
pub use short_link::Entity as ShortLinkEntity;
