// Provisioning workflow: idempotent volume and container setup, plus status and teardown.

mod auxiliary;
mod orchestrator;
mod status;
mod teardown;
mod types;

pub use auxiliary::{CONTAINER_SCRIPT_PATH, SETUP_SCRIPT, run_setup_script};
pub use orchestrator::{CLI_BINARY, READINESS_DELAY, detect_drift, probe_cli, provision};
pub use status::{EnvironmentStatus, status};
pub use teardown::{TeardownOutcome, teardown};
pub use types::{
    AuxiliaryOutcome, CliProbe, ContainerDisposition, DEFAULT_CONTAINER_NAME, DEFAULT_IMAGE,
    DEFAULT_VOLUME_NAME, ExistingAction, ProvisionError, ProvisioningOutcome, ProvisioningRequest,
    WORK_DIR,
};
