// Stable error codes, one per abstract error kind.
// Codes are part of the public contract: never renumber, only append.

pub mod authorization {
    pub const UNAUTHORIZED: &str = "AUTHZ_3001";
    pub const FORBIDDEN: &str = "AUTHZ_3002";
}

pub mod lookup {
    pub const NOT_FOUND: &str = "NOT_FOUND_4001";
}

pub mod validation {
    pub const INVALID_PAYLOAD: &str = "VALIDATION_1001";
}

pub mod configuration {
    pub const INVALID_CONFIGURATION: &str = "CONFIG_5001";
}

pub mod internal {
    pub const INTERNAL: &str = "INTERNAL_9001";
}
