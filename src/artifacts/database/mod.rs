pub mod database_entry;
pub mod object_record;
