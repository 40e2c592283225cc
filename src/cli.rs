use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub service: Service,
}

#[derive(Subcommand, Debug)]
pub enum Service {
    /// Object storage commands
    S3 {
        #[command(subcommand)]
        command: S3Command,
    },

    /// Container registry commands
    Ecr {
        #[command(subcommand)]
        command: EcrCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum S3Command {
    /// Copy between s3://bucket/key, a local file, or `-` for stdin/stdout
    Cp {
        src: String,

        /// `.` names the file after the last segment of <SRC>
        dst: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum EcrCommand {
    /// Print a `docker login` command for each registry
    GetLogin {
        /// --region <name>, --registry-ids <id>...
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },
}
