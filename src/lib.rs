//! # portal-gate (Edge Session Gate & Role Resolution)
//!
//! `portal-gate` sits in front of the browser-facing workspaces of the
//! collaboration platform (`admin`, `client`, `project-manager`) and decides,
//! per request, whether a session cookie is required before a page renders.
//!
//! ## Edge Session Gate
//!
//! Every request is classified against an explicit allow-list of public path
//! rules. Anything not on the list is protected (fail-closed).
//!
//! - **Protected, no cookie:** redirect to the login page with the original
//!   path and query carried in `next`.
//! - **Login page, cookie present:** redirect to the sanitized `next` target or
//!   the workspace landing page.
//! - **Otherwise:** continue to the upstream workspace.
//!
//! Cookie presence is only a hint. The gate never validates session tokens;
//! the backend re-authorizes every privileged call.
//!
//! ## Role Resolution
//!
//! [`identity::RoleResolver`] fetches `/api/auth/me` once per activation and
//! publishes a `Loading` → `Resolved`/`Anonymous` transition. Failures are folded
//! into `Anonymous`, and results arriving after deactivation are discarded.

pub mod api;
pub mod cli;
pub mod gate;
pub mod identity;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
