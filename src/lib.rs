pub mod shared {
    pub mod infrastructure {
        pub mod key_value_store;
    }
}

pub mod modules {
    pub mod products {
        pub mod core {
            pub mod expiry_date;
            pub mod listing;
            pub mod product;
        }
        pub mod use_cases {
            pub mod errors;
            pub mod create_product {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod update_product {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod delete_product {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_product {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod list_products {
                pub mod inbound {
                    pub mod http;
                }
                pub mod queries_port;
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod product_repository;
                pub mod product_repository_in_memory;
            }
        }
    }

    pub mod offline_sync {
        pub mod core {
            pub mod cached_product;
            pub mod merge;
            pub mod outbox_entry;
            pub mod ports;
            pub mod sync_report;
        }
        pub mod application {
            pub mod connectivity_monitor;
            pub mod errors;
            pub mod sync_coordinator;
        }
        pub mod adapters {
            pub mod outbound {
                pub mod http_product_client;
                pub mod local_cache;
                pub mod outbox;
            }
        }
    }
}

pub mod shell;
