//! Data models for the MIS & Invoicing backend.
//!
//! - `auth`: request and response payloads of the authentication endpoints
//! - `resource`: managed entities (chains, brands, groups, sub-zones,
//!   estimates, invoices) and their table rendering

pub mod auth;
pub mod resource;

pub use auth::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest,
};
pub use resource::{
    Brand, Chain, Estimate, Group, Invoice, ResourceKind, ResourceTable, Subzone, TableRow,
};
