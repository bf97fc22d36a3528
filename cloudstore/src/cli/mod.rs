pub mod bugreport;
pub mod client;
pub mod server;
pub mod version;

pub const SERVER_SUBCOMMAND: &str = "server";
pub const SERVER_DESCRIPTION: &str = "Run the server";

pub const VERSION_SUBCOMMAND: &str = "version";
pub const VERSION_DESCRIPTION: &str = "Display the version and build information";

pub const BUGREPORT_SUBCOMMAND: &str = "bugreport";
pub const BUGREPORT_DESCRIPTION: &str =
    "Collect information about the system and the environment for bug reports";

pub const REGISTER_SUBCOMMAND: &str = "register";
pub const REGISTER_DESCRIPTION: &str = "Register a new user";

pub const LOGIN_SUBCOMMAND: &str = "login";
pub const LOGIN_DESCRIPTION: &str = "Open a session and print its access token";

pub const LOGOUT_SUBCOMMAND: &str = "logout";
pub const LOGOUT_DESCRIPTION: &str = "Close the session of the access token";

pub const UPLOAD_SUBCOMMAND: &str = "upload";
pub const UPLOAD_DESCRIPTION: &str =
    "Upload a local file, replacing a stored file with the same name";

pub const DOWNLOAD_SUBCOMMAND: &str = "download";
pub const DOWNLOAD_DESCRIPTION: &str = "Download a stored file";

pub const RENAME_SUBCOMMAND: &str = "rename";
pub const RENAME_DESCRIPTION: &str = "Rename a stored file";

pub const DELETE_SUBCOMMAND: &str = "delete";
pub const DELETE_DESCRIPTION: &str = "Delete a stored file";

pub const LIST_SUBCOMMAND: &str = "list";
pub const LIST_DESCRIPTION: &str = "List stored files ordered by name";

pub const URI_ENV: &str = "CLOUDSTORE_URI";
pub const TOKEN_ENV: &str = "CLOUDSTORE_TOKEN";
pub const DEFAULT_URI: &str = "http://localhost:5000";
