pub mod bill;
pub mod dining_table;
pub mod menu_item;
pub mod order;
pub mod order_line;
