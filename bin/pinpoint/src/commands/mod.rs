pub mod config_cmd;
pub mod devices;
pub mod doctor;
pub mod inspect;
pub mod serve;
pub mod tools_cmd;
