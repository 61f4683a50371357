use serde::Serialize;

/// Partner institution contributing records to the data space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Institution {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub patient_count: u32,
}

const DIRECTORY: [Institution; 3] = [
    Institution {
        id: "dkfz",
        name: "German Cancer Research Center",
        location: "Heidelberg",
        patient_count: 500,
    },
    Institution {
        id: "ukhd",
        name: "University Hospital Heidelberg",
        location: "Heidelberg",
        patient_count: 700,
    },
    Institution {
        id: "embl",
        name: "European Molecular Biology Laboratory",
        location: "Heidelberg",
        patient_count: 300,
    },
];

pub const fn directory() -> &'static [Institution] {
    &DIRECTORY
}

pub fn ids() -> impl Iterator<Item = &'static str> {
    DIRECTORY.iter().map(|institution| institution.id)
}
