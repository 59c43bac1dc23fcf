pub mod normal_number;
pub mod id_sorter;
pub mod fs;
