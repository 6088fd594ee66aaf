use clap::{Parser, Subcommand};
use common_types::{Collection, ContestStatus};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Face similarity and contest ranking", long_about = None)]
pub struct Args {
    /// Use throwaway in-memory stores instead of postgres.
    #[clap(long, default_value_t = false, action)]
    pub in_memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Embed an image without storing anything.
    Embed { image: PathBuf },

    /// Register a photo for a user.
    Upload {
        #[clap(long, short)]
        user: i32,
        image: PathBuf,
        /// Where the file lives in storage; defaults to the given path.
        #[clap(long)]
        storage_path: Option<String>,
    },

    /// Use one of the user's photos as their profile face.
    Profile {
        #[clap(long, short)]
        user: i32,
        #[clap(long, short)]
        photo: String,
    },

    /// Similarity between two photos.
    Compare { photo_a: String, photo_b: String },

    /// Similarity between the profile faces of two users.
    CompareUsers { user_a: i32, user_b: i32 },

    /// Rank friends by resemblance to the user.
    Friends {
        #[clap(long, short)]
        user: i32,
        #[clap(required = true)]
        friends: Vec<i32>,
    },

    /// Closest stored faces to a photo.
    Lookalikes {
        photo: String,
        #[clap(long, short, default_value = "photo")]
        collection: Collection,
        #[clap(short, default_value_t = 5)]
        k: usize,
    },

    #[command(subcommand)]
    Contest(ContestCommand),
}

#[derive(Subcommand, Debug)]
pub enum ContestCommand {
    /// Create a contest around a target face.
    Create {
        #[clap(long, short)]
        name: String,
        image: PathBuf,
        #[clap(long)]
        storage_path: Option<String>,
    },

    /// Move a contest to `active` or `closed`.
    Status { contest: String, status: ContestStatus },

    /// Enter a user's photo into a contest.
    Submit {
        contest: String,
        #[clap(long, short)]
        user: i32,
        #[clap(long, short)]
        photo: String,
    },

    /// Rank entries and store the top three.
    Rank { contest: String },

    /// All entries in contest order.
    Standings { contest: String },

    /// The stored contest, including its current winners.
    Show { contest: String },
}
