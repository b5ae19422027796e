mod key_props;
mod read_through;
mod store_failures;
