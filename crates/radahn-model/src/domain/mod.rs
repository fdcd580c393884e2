mod task_name;
pub use task_name::TaskName;

mod slot_info;
pub use slot_info::{SlotInfo, Submission};

mod run_params;
pub use run_params::RunParams;

mod request;
pub use request::{
    GEOMETRY_FILE, GenerateRequest, LMP_FILE, MOTORS_FILE, OpenFolderRequest, RESERVED_ARTIFACTS,
    RUN_PARAMS_FILE, SaveProjectRequest,
};

mod event;
pub use event::{ClientEvent, LogLevel};

mod control;
pub use control::{ControlCommand, ControlMessage, MessageHeader};

/// Logical identifier for a registry slot.
///
/// A slot admits at most one running activity at a time.
pub type Slot = String;
