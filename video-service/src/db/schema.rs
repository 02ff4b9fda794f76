diesel::table! {
    users (id) {
        id -> Text,
        email -> Text,
        password -> Text,
        username -> Text,
        role -> Text,
        bio -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    videos (id) {
        id -> Text,
        title -> Text,
        description -> Nullable<Text>,
        url -> Text,
        secure_url -> Text,
        allowed -> Bool,
        creator_id -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(videos -> users (creator_id));
diesel::allow_tables_to_appear_in_same_query!(users, videos);
