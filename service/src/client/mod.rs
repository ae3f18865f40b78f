pub(crate) mod bucket_client;
pub(crate) mod object_store_client;
