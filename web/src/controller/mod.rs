pub(crate) mod health_check_controller;
pub(crate) mod history_controller;
pub(crate) mod job_controller;
