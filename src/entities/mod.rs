pub mod company;
pub mod local_sequence;
pub mod movie;
pub mod person;
pub mod personal;
