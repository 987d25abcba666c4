pub mod assessments;
pub mod attendance;
pub mod backup;
pub mod classes;
pub mod core;
pub mod courses;
pub mod events;
pub mod reassign;
pub mod settings;
pub mod students;
pub mod teachers;
