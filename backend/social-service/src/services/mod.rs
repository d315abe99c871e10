pub mod accounts;
pub mod engagement;
pub mod notifications;
pub mod social_graph;

pub use accounts::{AccountService, AccountSession, LoginRequest, RegisterRequest};
pub use engagement::{CommentDraft, EngagementService, LikeOutcome, PostDraft, PostEdit};
pub use notifications::NotificationService;
pub use social_graph::{FollowOutcome, SocialGraphService};
