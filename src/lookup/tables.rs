// Bilingual option tables for the member form (English, Malayalam)

pub(super) const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

pub(super) const RELATIONSHIPS: [(&str, &str); 19] = [
    ("Head", "ഗ്രഹനാഥൻ"),
    ("Father", "പിതാവ്"),
    ("Mother", "മാതാവ്"),
    ("Son", "മകൻ"),
    ("Daughter", "മകൾ"),
    ("Husband", "ഭർത്താവ്"),
    ("Wife", "ഭാര്യ"),
    ("Brother", "സഹോദരൻ"),
    ("Sister", "സഹോദരി"),
    ("Grandfather", "മുത്തച്ഛൻ"),
    ("Grandmother", "മുത്തശ്ശി"),
    ("Uncle", "അമ്മാവൻ"),
    ("Aunt", "അമ്മായി"),
    ("Nephew", "അനന്തരവൻ"),
    ("Niece", "അനന്തരവൾ"),
    ("Son-in-law", "മരുമകൻ"),
    ("Daughter-in-law", "മരുമകൾ"),
    ("Father-in-law", "അമ്മായിയപ്പൻ"),
    ("Mother-in-law", "അമ്മായിയമ്മ"),
];

pub(super) const OCCUPATIONS: [(&str, &str); 23] = [
    ("Student", "വിദ്യാർത്ഥി"),
    ("Teacher", "അധ്യാപകൻ"),
    ("Doctor", "ഡോക്ടർ"),
    ("Nurse", "നഴ്സ്"),
    ("Engineer", "എഞ്ചിനീയർ"),
    ("Farmer", "കർഷകൻ"),
    ("Business", "ബിസിനസ്"),
    ("Government Employee", "സർക്കാർ ജീവനക്കാരൻ"),
    ("Private Employee", "സ്വകാര്യ ജീവനക്കാരൻ"),
    ("Retired", "വിരമിച്ചവർ"),
    ("Homemaker", "ഗൃഹിണി"),
    ("Unemployed", "തൊഴിലില്ലാത്തവർ"),
    ("Lawyer", "വക്കീൽ"),
    ("Police", "പോലീസ്"),
    ("Driver", "ഡ്രൈവർ"),
    ("Mechanic", "മെക്കാനിക്"),
    ("Electrician", "ഇലക്ട്രീഷ്യൻ"),
    ("Carpenter", "മിസ്ത്രി"),
    ("Shop Owner", "കട ഉടമ"),
    ("Accountant", "അക്കൗണ്ടന്റ്"),
    ("Bank Employee", "ബാങ്ക് ജീവനക്കാരൻ"),
    ("IT Professional", "ഐടി പ്രൊഫഷണൽ"),
    ("Other", "മറ്റുള്ളവ"),
];
