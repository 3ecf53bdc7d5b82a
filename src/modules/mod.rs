pub mod attendance;
pub mod class_times;
pub mod enrollments;
pub mod families;
pub mod groups;
pub mod id_cards;
pub mod materials;
pub mod payments;
pub mod projects;
pub mod schools;
pub mod system_ids;
pub mod users;
