//! Companies domain module.
//!
//! A company is the tenant of the system: it logs in, owns products and acts as
//! buyer and/or seller. This crate holds the registration, profile and
//! soft-delete rules as pure domain logic (no IO, no HTTP, no storage).

pub mod company;

pub use company::{
    Company, CompanyProfile, CompanyStatus, PasswordChange, ProfileUpdate, Registration,
    RegistrationPlan, plan_registration,
};
