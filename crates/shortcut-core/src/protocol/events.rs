//! Event names used on the bridge.
//!
//! The bridge routes purely by name, so these strings *are* the protocol.
//!
//! | Direction          | Event                       | Args                          |
//! |--------------------|-----------------------------|-------------------------------|
//! | controller → host  | `register`                  | accelerator                   |
//! | controller → host  | `unregister`                | accelerator                   |
//! | controller → host  | `unregister-all`            | (none)                        |
//! | controller → host  | `query`                     | accelerator, correlation id   |
//! | host → controller  | `fired`                     | accelerator                   |
//! | host → controller  | `query-completed:<id>`      | boolean                       |

/// Asks the host to own an accelerator.
pub const REGISTER: &str = "register";

/// Asks the host to release an accelerator.
pub const UNREGISTER: &str = "unregister";

/// Asks the host to release every accelerator held by this controller.
pub const UNREGISTER_ALL: &str = "unregister-all";

/// Asks the host whether an accelerator is currently registered by anyone.
pub const QUERY: &str = "query";

/// Broadcast by the host when the user triggers an accelerator.
pub const FIRED: &str = "fired";

/// Prefix of the one-shot channel carrying the answer to a single `query`.
///
/// The full channel name is this prefix followed by the textual correlation id.
pub const QUERY_COMPLETED_PREFIX: &str = "query-completed:";
