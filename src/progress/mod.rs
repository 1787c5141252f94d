//! Progress observability primitives.

pub mod bus;
pub mod event;
pub mod reporter;
pub mod session;

pub use bus::ProgressBus;
pub use event::{
    BatchBoundaryData,
    BatchCompletedData,
    BatchCountdownData,
    CampaignEvent,
    CampaignStartedData,
    ContactOutcomeData,
    ProgressEnvelope,
    ProgressEvent,
    RunMode,
    StateChangedData,
};
pub use reporter::{
    EventFileSink,
    FanoutReporter,
    ProgressReporter,
    ReportError,
    Reporter,
    TracingReporter,
};
pub use session::{new_campaign_id, now_millis};
