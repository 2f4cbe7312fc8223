diesel::table! {
    medicine (item_id) {
        item_id -> Uuid,
        name -> Varchar,
        quantity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    medicine_reservations (record_id) {
        record_id -> Uuid,
        item_id -> Uuid,
        requester_label -> Varchar,
        location_label -> Varchar,
        quantity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tools (item_id) {
        item_id -> Uuid,
        name -> Varchar,
        quantity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tool_reservations (record_id) {
        record_id -> Uuid,
        item_id -> Uuid,
        requester_label -> Varchar,
        location_label -> Varchar,
        quantity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(medicine_reservations -> medicine (item_id));
diesel::joinable!(tool_reservations -> tools (item_id));

diesel::allow_tables_to_appear_in_same_query!(
    medicine,
    medicine_reservations,
    tools,
    tool_reservations,
);
