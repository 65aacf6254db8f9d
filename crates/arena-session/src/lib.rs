//! arena-session — find the host participant of a room.
//!
//! ```text
//! ParticipantResolver
//!   └── dyn SessionService
//!       └── LiveKitRoomService (Twirp ListParticipants, HS256 token)
//! ```

pub mod error;
pub mod livekit;
pub mod resolver;
pub mod token;

pub use error::{ResolveError, SessionError, SessionResult};
pub use livekit::LiveKitRoomService;
pub use resolver::{ParticipantResolver, SessionService};
pub use token::TokenSigner;
