//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. `email` is unique and stored lower-cased.
    users (id) {
        id -> Uuid,
        email -> Text,
        name -> Text,
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        last_login -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    conversations (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Text,
        preview -> Text,
        message_count -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Chat messages. `books` holds the book cards shown with the message.
    messages (id) {
        id -> Uuid,
        conversation_id -> Uuid,
        role -> Varchar,
        content -> Text,
        books -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (user, book); see `reading_list_user_book_key`.
    reading_list (id) {
        id -> Uuid,
        user_id -> Uuid,
        book_id -> Text,
        title -> Text,
        authors -> Array<Text>,
        thumbnail -> Nullable<Text>,
        description -> Nullable<Text>,
        page_count -> Nullable<Int4>,
        categories -> Array<Text>,
        published_date -> Nullable<Text>,
        publisher -> Nullable<Text>,
        priority -> Varchar,
        notes -> Text,
        is_read -> Bool,
        added_at -> Timestamptz,
        date_finished -> Nullable<Timestamptz>,
        user_rating -> Nullable<Int2>,
        user_review -> Nullable<Text>,
    }
}

diesel::table! {
    recommendations (id) {
        id -> Uuid,
        user_id -> Uuid,
        book_id -> Text,
        title -> Text,
        authors -> Nullable<Text>,
        thumbnail -> Nullable<Text>,
        description -> Nullable<Text>,
        published_date -> Nullable<Text>,
        publisher -> Nullable<Text>,
        page_count -> Nullable<Int4>,
        rating -> Nullable<Text>,
        preview_link -> Text,
        clicked_at -> Timestamptz,
    }
}

diesel::joinable!(conversations -> users (user_id));
diesel::joinable!(messages -> conversations (conversation_id));
diesel::joinable!(reading_list -> users (user_id));
diesel::joinable!(recommendations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    conversations,
    messages,
    reading_list,
    recommendations,
);
