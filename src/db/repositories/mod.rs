mod environment_log;
mod patients;
mod vitals_log;
