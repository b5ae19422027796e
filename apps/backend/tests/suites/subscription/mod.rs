mod timeouts;
