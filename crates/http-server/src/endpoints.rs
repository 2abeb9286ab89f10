pub mod health;
pub mod protocol_view;
pub mod session_data;
pub mod session_list;
pub mod shared;
