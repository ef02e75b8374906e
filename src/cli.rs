use clap::Parser;

/// Load an exported detector and predict a single image.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serialized detection graph (ONNX)
    #[arg(long, env = "DETECT_MODEL")]
    pub model: String,

    /// Newline-delimited tag names, one per model class index
    #[arg(long, env = "DETECT_LABELS")]
    pub labels: String,

    /// Image to predict: a file path, or an http(s) URL
    pub source: String,
}
