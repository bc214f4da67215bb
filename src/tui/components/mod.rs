//! # TUI Components
//!
//! ```text
//! ┌ TitleBar ─────────────────────────────────────┐
//! │ quizshell | Topics | session 1a2b3c4d         │
//! ├ NavSidebar ──┬ MountView ─────────────────────┤
//! │ ⌂ Home       │ Topics: history                │
//! │ ☰ Topics     │ • Ancient Rome [#/quiz/...]    │
//! │ ...          │                                │
//! ├ AddressBar ──┴────────────────────────────────┤
//! │ #/topics/history                              │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Stateless components (`TitleBar`, `NavSidebar`, `MountView`) take all
//! their data as props. `AddressBar` owns its text buffer and emits
//! `AddressEvent`s. Full-bleed routes hide the sidebar.

mod address_bar;
mod mount_view;
mod nav_sidebar;
mod title_bar;

pub use address_bar::{AddressBar, AddressEvent};
pub use mount_view::MountView;
pub use nav_sidebar::{NavSidebar, footer_entries, nav_entries};
pub use title_bar::TitleBar;
