//! # TUI Components
//!
//! ### Stateless (props only, rebuilt every frame)
//! - `TitleBar`: session id, status and transient notices
//! - `Message`: one chat turn with its image gallery
//! - `ImagePreview`: one uploaded image reference and its "analyzing" overlay
//! - `LandingPage`: empty-conversation screen
//!
//! ### Stateful (persistent state + transient component)
//! - `Composer`: message / image-path input
//! - `MessageList` + `MessageListState`: scrollable history with layout caching
//! - `ReportView` + `ReportViewState`: collapsible diagnostic report
//!
//! Each file holds the component's state, events, rendering and tests.
//!
//! ```text
//! components/
//! ├── title_bar.rs
//! ├── message.rs
//! ├── image_preview.rs
//! ├── message_list.rs
//! ├── report.rs
//! ├── landing.rs
//! └── input_box/       (Composer + line editor)
//! ```

pub mod image_preview;
pub mod input_box;
pub mod landing;
pub mod message;
pub mod message_list;
pub mod report;
mod title_bar;

pub use input_box::{Composer, ComposerEvent, ComposerMode};
pub use landing::LandingPage;
pub use message_list::{MessageList, MessageListState};
pub use report::{ReportEvent, ReportView, ReportViewState};
pub use title_bar::TitleBar;
