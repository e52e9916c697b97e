pub mod sub_tabs;
