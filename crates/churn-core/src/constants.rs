//! Constants shared by the churn serving crates.

/// Raw account attributes every complete record must carry, in declaration order.
///
/// Missing-field reports are always ordered by this list, never by input order.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "Geography",
    "Gender",
    "Age",
    "CreditScore",
    "Tenure",
    "Balance",
    "EstimatedSalary",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
];

/// Version of the encoding contract, not of the trained weights
pub const MODEL_VERSION: &str = "1.0";

/// Label rendered for a positive (churn) prediction
pub const LABEL_CHURN: &str = "Will Churn";

/// Label rendered for a negative (stay) prediction
pub const LABEL_STAY: &str = "Will Stay";

/// Separator between field name and observed value in indicator columns
pub const INDICATOR_SEPARATOR: char = '_';

/// Environment variable overriding the classifier artifact path
pub const MODEL_PATH_ENV: &str = "MODEL_PATH";

/// Environment variable overriding the manifest artifact path
pub const MANIFEST_PATH_ENV: &str = "MODEL_COLUMNS_PATH";

/// Environment variable pointing at the gateway TOML configuration
pub const CONFIG_PATH_ENV: &str = "CHURN_CONFIG";

/// Directory whose presence marks a packaged (serverless) deployment
pub const DEFAULT_DEPLOYMENT_MARKER: &str = "/var/task";

/// Artifact directory inside a packaged deployment
pub const DEFAULT_PACKAGED_DIR: &str = "/var/task/models";

/// Artifact directory for local runs, relative to the working directory
pub const DEFAULT_LOCAL_DIR: &str = "models";

/// Default classifier artifact file name
pub const MODEL_FILE_NAME: &str = "model.json";

/// Default manifest artifact file name
pub const MANIFEST_FILE_NAME: &str = "model_columns.json";
