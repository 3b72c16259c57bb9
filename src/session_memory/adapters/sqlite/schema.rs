//! Diesel schema for session memory stores.

diesel::table! {
    /// Interaction records of one session.
    notes (id) {
        /// Insertion-ordered record identifier.
        id -> Integer,
        /// Write time as Unix milliseconds.
        ts -> BigInt,
        /// Speaker or category.
        role -> Text,
        /// Record body.
        content -> Text,
    }
}
