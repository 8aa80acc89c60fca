pub mod message;
pub mod ticket;
pub mod user;

pub use message::Message;
pub use ticket::{Ticket, TicketTheme};
pub use user::User;
