use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-squeeze-client",
    about = "Resize and compress an image through a remote compression service",
    long_about = "img-squeeze-client uploads an image together with a resize percentage and a quality \
                  level to a compression service, then shows the original and the compressed result \
                  side by side.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    img-squeeze-client compress photo.jpg -s 50 -q 60\n  \
    img-squeeze-client --backend https://squeeze.example.com compress photo.png -o small.png\n  \
    img-squeeze-client info photo.png"
)]
pub struct Args {
    #[arg(
        short = 'b',
        long,
        global = true,
        env = "IMG_SQUEEZE_BACKEND",
        help = "Compression service base URL (default: http://localhost:5000)"
    )]
    pub backend: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Per-request timeout in seconds (default: 30)"
    )]
    pub timeout: Option<u64>,

    #[arg(
        long,
        global = true,
        help = "Retries after connection failures (default: 2)",
        long_help = "Number of extra attempts after a transport failure. \
                     Rejections from the service are never retried."
    )]
    pub retries: Option<u32>,

    #[arg(short = 'v', long, global = true, help = "Show debug output")]
    pub verbose: bool,

    #[arg(short = 'Q', long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Upload an image and compare it with the compressed result",
        long_about = "Reads the image locally, uploads it with the given scale and quality, \
                      and prints the original and compressed metadata side by side."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(
            short = 's',
            long,
            allow_negative_numbers = true,
            help = "Resize percentage (default: 100)",
            long_help = "Resize percentage sent to the service. \
                         The value is not checked locally; the service may reject or clamp it."
        )]
        scale: Option<i32>,

        #[arg(
            short = 'q',
            long,
            allow_negative_numbers = true,
            help = "Compression quality (default: 60)",
            long_help = "Quality sent to the service, normally 1 (lowest) to 100 (highest). \
                         The value is not checked locally."
        )]
        quality: Option<i32>,

        #[arg(
            short = 'o',
            long,
            help = "Save the compressed image to this path"
        )]
        output: Option<PathBuf>,
    },

    #[command(
        about = "Show the local metadata of an image",
        long_about = "Prints name, size and dimensions as they would be reported for the \
                      original image, without contacting the service."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,
    },
}
