//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Voting events with their embedded media blocks.
    voting_codes (id) {
        id -> Text,
        /// Array of media blocks; the `qvote` block holds verification
        /// settings and stats.
        media -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Phone-verified voters, keyed `{codeId}_{digits}`.
    verified_voters (key) {
        key -> Text,
        session_token -> Text,
        session_expires_at -> Nullable<Timestamptz>,
        votes_used -> Int4,
        max_votes -> Nullable<Int4>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Candidate vote counters.
    candidates (code_id, id) {
        code_id -> Text,
        id -> Text,
        vote_count -> Int8,
        finals_vote_count -> Int8,
    }
}

diesel::table! {
    /// One row per (voter, candidate, round).
    ballots (id) {
        id -> Text,
        code_id -> Text,
        category_id -> Nullable<Text>,
        candidate_id -> Text,
        voter_id -> Text,
        round -> Int2,
        phone -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(voting_codes, verified_voters, candidates, ballots);
