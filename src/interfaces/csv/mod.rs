pub mod reconciliation_writer;
