pub mod ddh;
