//! Inspect engine: input loading, URL inspection, batch running and checkpoint IO.
mod check;
mod checkpoint;
mod credentials;
mod decode;
mod input;
mod persist;
mod runner;
mod types;

pub use check::{CheckerSettings, GscChecker, StatusChecker, DEFAULT_API_BASE};
pub use checkpoint::{
    encode_checkpoint, final_result_filename, CheckpointError, CheckpointStore,
    CHECKPOINT_COLUMNS, PARTIAL_CHECKPOINT_FILENAME,
};
pub use credentials::{
    CredentialError, ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider,
    TokenProvider, INSPECTION_SCOPE,
};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use input::{
    load_records, parse_csv, parse_text, InputError, InputKind, LoadedInput, Table,
    URL_SAMPLE_SIZE,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use runner::{BatchRunner, RunObserver, RunReport, RunSettings};
pub use types::{CheckError, CheckFailureKind};
