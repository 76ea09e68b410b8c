// Keep in sync with migrations/2024-06-01-000000_create_calendar/up.sql

diesel::table! {
    calendar_event (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        is_all_day -> Bool,
        location -> Nullable<Text>,
        color -> Nullable<Text>,
        transparency -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    recurrence_rule (id) {
        id -> Uuid,
        event_id -> Uuid,
        frequency -> Text,
        step_interval -> Int4,
        by_day -> Array<Text>,
        by_month -> Array<Int4>,
        by_month_day -> Array<Int4>,
        max_count -> Nullable<Int4>,
        until_time -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    event_occurrence (id) {
        id -> Uuid,
        event_id -> Uuid,
        occurrence_time -> Timestamptz,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    event_exception (id) {
        id -> Uuid,
        event_id -> Uuid,
        original_time -> Timestamptz,
        occurrence_id -> Nullable<Uuid>,
        title -> Nullable<Text>,
        description -> Nullable<Text>,
        location -> Nullable<Text>,
        color -> Nullable<Text>,
        transparency -> Nullable<Text>,
        start_time -> Nullable<Timestamptz>,
        end_time -> Nullable<Timestamptz>,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    event_reminder (id) {
        id -> Uuid,
        event_id -> Uuid,
        minutes_before -> Int4,
        method -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(recurrence_rule -> calendar_event (event_id));
diesel::joinable!(event_occurrence -> calendar_event (event_id));
diesel::joinable!(event_exception -> calendar_event (event_id));
diesel::joinable!(event_reminder -> calendar_event (event_id));

diesel::allow_tables_to_appear_in_same_query!(
    calendar_event,
    recurrence_rule,
    event_occurrence,
    event_exception,
    event_reminder,
);
