use bugreport::{
    bugreport,
    collector::{CompileTimeInformation, EnvironmentVariables, OperatingSystem, SoftwareVersion},
    format::Markdown,
};

pub fn run() {
    bugreport!()
        .info(SoftwareVersion::default())
        .info(OperatingSystem::default())
        .info(EnvironmentVariables::list(&[
            "SHELL",
            "TERM",
            "RUST_LOG",
            "CLOUDSTORE_URI",
            "CLOUDSTORE_DATA_DIR",
            "CLOUDSTORE_DATA_FILE",
            "CLOUDSTORE_FILES_DIR",
            "CLOUDSTORE_PORT",
            "CLOUDSTORE_MAX_BODY",
            "CLOUDSTORE_REQUEST_TIMEOUT",
        ]))
        .info(CompileTimeInformation::default())
        .print::<Markdown>();
}
