/// Photo gallery server
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	/// The config file path
	#[clap(long, env = "GALLERY_CONFIG_FILE")]
	pub config_file: Option<String>,

	#[clap(subcommand)]
	pub command: Option<Commands>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
	/// Run the HTTP server (default)
	Serve,

	/// Apply the database migrations
	Migrate,

	/// Create a user account
	CreateUser(CreateUser),
}

#[derive(Debug, clap::Args)]
pub struct CreateUser {
	/// The username of the account
	#[clap(long)]
	pub username: String,

	/// The password of the account
	#[clap(long, env = "GALLERY_USER_PASSWORD", hide_env_values = true)]
	pub password: String,

	/// Grant the account rights over every album and photo
	#[clap(long)]
	pub superuser: bool,
}
