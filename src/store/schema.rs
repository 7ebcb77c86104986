pub const SCHEMA: &str = r#"
-- Counter employees and their per-pass-type allocation ledger
CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,

    -- Allocation counters: maximum sellable quantity per pass type
    express_pass INTEGER NOT NULL DEFAULT 0,
    junior_pass INTEGER NOT NULL DEFAULT 0,
    regular_pass INTEGER NOT NULL DEFAULT 0,
    student_pass INTEGER NOT NULL DEFAULT 0,
    senior_citizen_pass INTEGER NOT NULL DEFAULT 0,
    pwd_pass INTEGER NOT NULL DEFAULT 0,

    created_at TEXT DEFAULT (datetime('now'))
);

-- Tokens are auth credentials; non-admin tokens must belong to an employee
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- first 8 chars for fast lookup
    is_admin INTEGER NOT NULL DEFAULT 0,

    -- Employee binding (NULL only for admin tokens)
    employee_id TEXT REFERENCES employees(id) ON DELETE CASCADE,

    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,            -- NULL = never
    last_used_at TEXT
);

-- Sales ledger: one row per ticket sale, tied to one employee and one pass type.
-- employee_id goes NULL when the selling employee is deleted; the sale stands.
CREATE TABLE IF NOT EXISTS sales (
    ticket_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    amount REAL NOT NULL,
    booked_date TEXT NOT NULL,
    purchased_date TEXT NOT NULL,
    pass_type TEXT NOT NULL,
    employee_id TEXT REFERENCES employees(id) ON DELETE SET NULL
);

-- Cancellation ledger: at most one request per ticket. The customer fields
-- are duplicated from the sale at submission time; status is Pending until
-- an admin approves or rejects.
CREATE TABLE IF NOT EXISTS cancellations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL UNIQUE REFERENCES sales(ticket_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    reasons TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    amount REAL NOT NULL,
    booked_date TEXT NOT NULL,
    purchased_date TEXT NOT NULL,
    pass_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Pending'
);

-- One price per pass type, seeded with defaults at first run
CREATE TABLE IF NOT EXISTS pricing (
    pass_type TEXT PRIMARY KEY,
    price REAL NOT NULL CHECK (price >= 0)
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_employee ON tokens(employee_id);
CREATE INDEX IF NOT EXISTS idx_sales_employee ON sales(employee_id);
CREATE INDEX IF NOT EXISTS idx_sales_pass_type ON sales(pass_type);
CREATE INDEX IF NOT EXISTS idx_cancellations_status ON cancellations(status);
"#;
