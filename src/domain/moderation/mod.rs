//! Moderation review domain module.
//!
//! Review tickets opened by automated moderation or by members, and the
//! transitions moderators apply to them.

mod ticket;

pub use ticket::{ReportTarget, Resolution, ReviewTicket, TicketCategory, TicketStatus};
